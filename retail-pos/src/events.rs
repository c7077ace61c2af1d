use uuid::Uuid;

/// Something the operator asked the terminal to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    // Catalogue
    ListStores,
    ShowStore(Uuid),
    ListItems {
        search: Option<String>,
        page: Option<u32>,
    },
    ShowItem(Uuid),
    SetStock {
        item_id: Uuid,
        quantity: i64,
    },

    // Session
    WhoAmI,
    /// Ask for credentials at the prompt, then sign in
    SignInPrompt,
    SignIn {
        username: String,
        password: String,
    },
    RefreshSession,
    SignOut,

    Help,
    Quit,
}

impl AppCommand {
    /// Commands that talk to the API and need a signed-in session
    pub fn requires_session(&self) -> bool {
        !matches!(
            self,
            AppCommand::SignIn { .. }
                | AppCommand::SignInPrompt
                | AppCommand::Help
                | AppCommand::Quit
                | AppCommand::SignOut
        )
    }
}
