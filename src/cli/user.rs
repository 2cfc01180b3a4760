//! The `user` subcommand.

use clap::{Args, ValueEnum};
use serde::Serialize;

use crate::cli::{
    gitlab::{ApiClientFactory, ListUsersOptions},
    session::Session,
    shared::{self, PageArgs},
};

/// Command-line arguments for the `user` subcommand.
#[derive(Args, Debug, Default)]
pub struct UserCommandArgs {
    #[command(flatten)]
    pub pages: PageArgs,

    /// Search by name, username or email
    #[arg(short, long, value_name = "TEXT", conflicts_with = "me")]
    pub search: Option<String>,

    /// Show the user the token belongs to
    #[arg(long)]
    pub me: bool,

    /// Fields to include in list output (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub fields: Vec<UserField>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum UserField {
    Id,
    Username,
    Name,
    State,
    WebUrl,
}

/// Execute the `user` subcommand.
pub fn run_user(args: UserCommandArgs, session: &Session) -> anyhow::Result<()> {
    let output = user(&args, session.api())?;

    shared::print_output(&output);

    Ok(())
}

fn user(args: &UserCommandArgs, api: &dyn ApiClientFactory) -> anyhow::Result<String> {
    let users = if args.me {
        vec![api.users().current_user()?]
    } else {
        api.users().list_users(&ListUsersOptions {
            search: args.search.clone(),
            active: false,
            page: args.pages.page,
            per_page: args.pages.num,
        })?
    };

    shared::format_list(
        &users,
        &args.fields,
        &[UserField::Id, UserField::Username, UserField::Name],
        &args.pages.format,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::gitlab::{User, fake::FakeGitLab};

    fn fake() -> FakeGitLab {
        FakeGitLab {
            users: vec![
                User {
                    id: 1,
                    username: "root".to_string(),
                    name: "Administrator".to_string(),
                    ..User::default()
                },
                User {
                    id: 22,
                    username: "alice".to_string(),
                    name: "Alice Liddell".to_string(),
                    ..User::default()
                },
            ],
            current_user: User {
                id: 22,
                username: "alice".to_string(),
                name: "Alice Liddell".to_string(),
                ..User::default()
            },
            ..FakeGitLab::default()
        }
    }

    #[test]
    fn test_list_users() {
        let api = fake();
        let args = UserCommandArgs {
            search: Some("a".to_string()),
            ..UserCommandArgs::default()
        };

        let output = user(&args, &api).unwrap();

        assert_eq!(output, "1   root   Administrator\n22  alice  Alice Liddell");
        assert_eq!(api.calls.borrow().as_slice(), ["list_users Some(\"a\")"]);
    }

    #[test]
    fn test_me_shows_current_user() {
        let api = fake();
        let args = UserCommandArgs {
            me: true,
            fields: vec![UserField::Username],
            ..UserCommandArgs::default()
        };

        let output = user(&args, &api).unwrap();

        assert_eq!(output, "alice");
        assert_eq!(api.call_names(), vec!["current_user"]);
    }
}
