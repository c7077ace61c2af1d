use crate::events::AppCommand;
use uuid::Uuid;

pub const HELP: &str = "\
Commands:
  stores                  list stores
  store <id>              show one store
  items [search] [page]   list items, optionally filtered
  item <id>               show one item
  stock <id> <quantity>   set the quantity on hand
  whoami                  show the signed-in user
  login                   sign in again
  refresh                 refresh the session now
  logout                  sign out
  help                    show this help
  quit                    exit";

/// Map a line typed at the prompt to a command.
/// Returns `Ok(None)` for a blank line.
pub fn parse_command(line: &str) -> Result<Option<AppCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match (name.to_lowercase().as_str(), args.as_slice()) {
        ("stores", []) => AppCommand::ListStores,
        ("store", [id]) => AppCommand::ShowStore(parse_id(id)?),
        ("items", []) => AppCommand::ListItems {
            search: None,
            page: None,
        },
        ("items", [search]) => AppCommand::ListItems {
            search: Some(search.to_string()),
            page: None,
        },
        ("items", [search, page]) => AppCommand::ListItems {
            search: Some(search.to_string()),
            page: Some(
                page.parse()
                    .map_err(|_| format!("Not a page number: {}", page))?,
            ),
        },
        ("item", [id]) => AppCommand::ShowItem(parse_id(id)?),
        ("stock", [id, quantity]) => AppCommand::SetStock {
            item_id: parse_id(id)?,
            quantity: quantity
                .parse()
                .map_err(|_| format!("Not a quantity: {}", quantity))?,
        },
        ("whoami", []) => AppCommand::WhoAmI,
        ("refresh", []) => AppCommand::RefreshSession,
        ("logout", []) => AppCommand::SignOut,
        ("help" | "?", _) => AppCommand::Help,
        ("quit" | "exit" | "q", []) => AppCommand::Quit,
        ("login", []) => AppCommand::SignInPrompt,
        (other, _) => return Err(format!("Unknown command `{}`. Type `help`.", other)),
    };

    Ok(Some(command))
}

fn parse_id(value: &str) -> Result<Uuid, String> {
    Uuid::parse_str(value).map_err(|_| format!("Not an id: {}", value))
}
