use agentic_core::domain::user::{NewUser, UserFilter, UserPatch};

use super::intent::Intent;
use super::slots::{extract, SlotProfile, SlotSet};
use crate::tools::UserApi;

/// A fully-argumented directory operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Register(NewUser),
    Update { id: i64, patch: UserPatch },
    Delete { id: i64 },
    GetById { id: i64 },
    List,
    DeleteAll,
}

/// Outcome of turning an intent plus prompt into a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Ready { command: Command, slots: SlotSet },
    /// Update without a usable id; answered with a dedicated clarification.
    MissingUpdateId { slots: SlotSet },
    /// Nothing to run; answered with the generic unrecognized message.
    Unresolved,
}

pub fn resolve(intent: Intent, prompt: &str) -> Resolution {
    match intent {
        Intent::Register => {
            let slots = extract(SlotProfile::Register, prompt);
            Resolution::Ready { command: Command::Register(slots.clone().into_registration()), slots }
        }
        Intent::Update => {
            let slots = extract(SlotProfile::Update, prompt);
            match slots.id {
                Some(id) => Resolution::Ready {
                    command: Command::Update { id, patch: slots.to_patch() },
                    slots,
                },
                None => Resolution::MissingUpdateId { slots },
            }
        }
        Intent::Delete => {
            let slots = extract(SlotProfile::Lookup, prompt);
            match slots.id {
                Some(id) => Resolution::Ready { command: Command::Delete { id }, slots },
                None => Resolution::Unresolved,
            }
        }
        Intent::GetById => {
            let slots = extract(SlotProfile::Lookup, prompt);
            match slots.id {
                Some(id) => Resolution::Ready { command: Command::GetById { id }, slots },
                None => Resolution::Unresolved,
            }
        }
        Intent::List => Resolution::Ready { command: Command::List, slots: SlotSet::default() },
        Intent::DeleteAll => {
            Resolution::Ready { command: Command::DeleteAll, slots: SlotSet::default() }
        }
        Intent::Unrecognized => Resolution::Unresolved,
    }
}

/// Runs exactly one directory call. Failures arrive as `Error: ...` text.
pub async fn dispatch(api: &UserApi, command: &Command) -> String {
    match command {
        Command::Register(new_user) => {
            api.register_user(&new_user.name, new_user.age, &new_user.job_title).await
        }
        Command::Update { id, patch } => api.update_user(*id, patch.clone()).await,
        Command::Delete { id } => api.delete_user(*id).await,
        Command::GetById { id } => api.get_user_by_id(*id).await,
        Command::List => api.get_all_users(UserFilter::default()).await,
        Command::DeleteAll => api.delete_all_users().await,
    }
}
