//! Local portal users

use async_trait::async_trait;
use chrono::{Local, NaiveDate, TimeDelta};
use ctera_client::{public_fields, segment};
use ctera_core::{
    modified_attributes, ArgumentError, CteraError, Parameters, ResourceKind, ReturnValue,
};
use ctera_shared_types::PresentState;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::args::parse;
use crate::common::{from_vendor, merge_put, plan_action, to_vendor, Action};
use crate::runner::{Module, ModuleContext};

const USERS: &str = "/users";

const FIELDS: [(&str, &str); 7] = [
    ("name", "name"),
    ("email", "email"),
    ("first_name", "firstName"),
    ("last_name", "lastName"),
    ("role", "role"),
    ("company", "company"),
    ("comment", "comment"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UserRole {
    #[default]
    Disabled,
    EndUser,
    ReadWriteAdmin,
    ReadOnlyAdmin,
    Support,
}

/// When the user has to change the password: a flag, days from today or a date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PasswordChange {
    Flag(bool),
    Days(i64),
    Date(String),
}

impl Default for PasswordChange {
    fn default() -> Self {
        PasswordChange::Flag(false)
    }
}

impl PasswordChange {
    /// Date the password expires on, if any.
    pub fn due_date(&self, today: NaiveDate) -> ctera_core::Result<Option<NaiveDate>> {
        match self {
            PasswordChange::Flag(false) => Ok(None),
            PasswordChange::Flag(true) => Ok(Some(today)),
            PasswordChange::Days(days) => TimeDelta::try_days(*days)
                .and_then(|delta| today.checked_add_signed(delta))
                .map(Some)
                .ok_or_else(|| {
                    CteraError::invalid_parameter(
                        "password_change",
                        format!("{} days from {} is out of range", days, today),
                    )
                }),
            PasswordChange::Date(date) => NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map(Some)
                .map_err(|err| {
                    CteraError::invalid_parameter("password_change", format!("{}: {}", date, err))
                }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LocalUserArgs {
    #[serde(default)]
    pub state: PresentState,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub update_password: bool,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub password_change: PasswordChange,
}

pub struct LocalUserModule;

#[async_trait]
impl Module for LocalUserModule {
    fn kind(&self) -> ResourceKind {
        ResourceKind::PortalLocalUser
    }

    fn failure_message(&self, _params: &Parameters) -> String {
        "User management failed".to_string()
    }

    fn validate(&self, params: &Parameters) -> Result<(), ArgumentError> {
        parse::<LocalUserArgs>(params).map(|_| ())
    }

    async fn execute(
        &self,
        ctx: &ModuleContext<'_>,
        params: Parameters,
        rv: &mut ReturnValue,
    ) -> ctera_core::Result<()> {
        let args: LocalUserArgs = parse(&params)?;
        let mut desired = Parameters::from_serializable(&args)?;
        desired.pop("state");
        desired.pop("update_password");
        let name = args.name.as_str();
        let path = format!("{}/{}", USERS, segment(name));

        let object = ctx.session.fetch(&path).await?;
        let current = object
            .as_ref()
            .map(|object| from_vendor(&public_fields(object).into_value(), &FIELDS));
        if current.is_some() {
            desired.pop("password_change");
            if !args.update_password {
                desired.pop("password");
            }
        }
        let action = plan_action(args.state, current.is_some(), || {
            current
                .as_ref()
                .map(|current| modified_attributes(current, &desired))
                .unwrap_or_default()
        });

        match action {
            Action::Create => {
                if args.password.is_none() {
                    return Err(CteraError::precondition(
                        "Cannot create new user without a password",
                    ));
                }
                let due = args.password_change.due_date(Local::now().date_naive())?;
                let mut create = self.kind().capabilities().create_params(&desired).drop_nulls();
                create.pop("password_change");
                let mut body = to_vendor(&create, &FIELDS);
                if let Some(due) = due {
                    body.insert(
                        "requirePasswordChangeOn".to_string(),
                        Value::from(due.format("%Y-%m-%d").to_string()),
                    );
                }
                log::info!("creating user {}", name);
                ctx.session.add(USERS, Value::Object(body)).await?;
                create.pop("password");
                rv.changed().msg("User created").put_all(create);
            }
            Action::Modify(diff) => {
                log::info!(
                    "modifying user {}: {:?}",
                    name,
                    diff.keys().collect::<Vec<_>>()
                );
                let changes = to_vendor(&diff, &FIELDS);
                merge_put(ctx.session, &path, object.unwrap_or(Value::Null), changes).await?;
                rv.changed().msg("User modified").put("name", name);
            }
            Action::Unchanged => {
                rv.skipped()
                    .msg("User details did not change")
                    .put("name", name);
            }
            Action::Delete => {
                log::info!("deleting user {}", name);
                ctx.session.delete(&path).await?;
                rv.changed().msg("User deleted").put("name", name);
            }
            Action::AlreadyAbsent => {
                rv.skipped()
                    .msg("User already does not exist")
                    .put("name", name);
            }
        }
        Ok(())
    }
}
