use crate::cli::actions::{Action, create_admin, hash_password, server};
use anyhow::Result;

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Server(args) => server::execute(args).await,
        Action::HashPassword(args) => hash_password::execute(&args),
        Action::CreateAdmin(args) => create_admin::execute(args).await,
    }
}
