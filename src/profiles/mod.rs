//! Client profiles - handler sets that turn inbound messages into state
//!
//! Each profile corresponds to one of the relay's browser pages:
//! - `display`: shows detection and the raw language id/name
//! - `greeter`: shows a greeting (and optional flag) picked by language index
//! - `monitor`: shows the last message received, whatever its address
//!
//! The pages only differ in their tables and state keys, so they are data
//! plus a few small handlers rather than separate clients.

use crate::dispatch::{expect_i32, expect_str, Dispatcher, HandlerError};
use crate::osc::{Message, OscError, TypedValue};
use crate::state::StateStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// `/detecting` flag, non-zero means a person is in front of the sensor
pub const DETECTED_VISIBLE: &str = "detected-visible";
pub const LANG_ID: &str = "lang-id";
pub const LANG_NAME: &str = "lang-name";
pub const GREETING_INDEX: &str = "greeting-index";
pub const GREETING: &str = "greeting";
pub const FLAG: &str = "flag";
/// Last message seen by the monitor, in `Message::describe` form
pub const MESSAGE: &str = "message";
pub const MESSAGE_COUNT: &str = "message-count";

/// Greeting table used when configuration does not supply one
pub fn default_greetings() -> Vec<String> {
    ["...", "Hello", "Guten Tag", "Bonjour", "Hola"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Which page's behaviour to install
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Display,
    #[default]
    Greeter,
    Monitor,
}

/// Lookup tables for the greeter, indexed by the `/lang` language index
#[derive(Debug, Clone, PartialEq)]
pub struct Tables {
    pub greetings: Vec<String>,
    /// Optional; when empty the `flag` slot is never written
    pub flags: Vec<String>,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            greetings: default_greetings(),
            flags: Vec::new(),
        }
    }
}

/// Register the profile's handlers on `dispatcher`, writing into `store`
pub fn install(
    profile: Profile,
    dispatcher: &mut Dispatcher,
    store: &StateStore,
    tables: &Tables,
) -> Result<(), OscError> {
    debug!(?profile, "Installing profile handlers");
    match profile {
        Profile::Display => {
            register_detecting(dispatcher, store)?;
            let store = store.clone();
            dispatcher.register("/lang", move |args| {
                let id = expect_i32(args, 0)?;
                let name = expect_str(args, 1)?;
                store.set(LANG_ID, id);
                store.set(LANG_NAME, name);
                Ok(())
            })?;
        },
        Profile::Greeter => {
            register_detecting(dispatcher, store)?;
            let store = store.clone();
            let tables = Arc::new(tables.clone());
            dispatcher.register("/lang", move |args| {
                let index = expect_i32(args, 0)?;
                let greeting = lookup(&tables.greetings, index)?;
                let flag = if tables.flags.is_empty() {
                    None
                } else {
                    Some(lookup(&tables.flags, index)?)
                };

                store.set(GREETING_INDEX, index);
                store.set(GREETING, greeting);
                if let Some(flag) = flag {
                    store.set(FLAG, flag);
                }
                Ok(())
            })?;
        },
        Profile::Monitor => {
            let store = store.clone();
            dispatcher.tap(move |message| {
                let count = store.get_int(MESSAGE_COUNT).unwrap_or(0) + 1;
                store.set(MESSAGE, message.describe());
                store.set(MESSAGE_COUNT, count);
            });
        },
    }
    Ok(())
}

/// The page's "send" button: `/bar "helloworld" 1234 567.89`
pub fn demo_message() -> Result<Message, OscError> {
    Message::new(
        "/bar",
        vec![
            TypedValue::from("helloworld"),
            TypedValue::Int32(1234),
            TypedValue::Float32(567.89),
        ],
    )
}

fn register_detecting(dispatcher: &mut Dispatcher, store: &StateStore) -> Result<(), OscError> {
    let store = store.clone();
    dispatcher.register("/detecting", move |args| {
        let flag = expect_i32(args, 0)?;
        store.set(DETECTED_VISIBLE, flag != 0);
        Ok(())
    })?;
    Ok(())
}

fn lookup(table: &[String], index: i32) -> Result<&str, HandlerError> {
    usize::try_from(index)
        .ok()
        .and_then(|i| table.get(i))
        .map(String::as_str)
        .ok_or(HandlerError::OutOfRange {
            index: i64::from(index),
            len: table.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(profile: Profile, tables: Tables) -> (Dispatcher, StateStore) {
        let mut dispatcher = Dispatcher::new();
        let store = StateStore::new();
        install(profile, &mut dispatcher, &store, &tables).unwrap();
        (dispatcher, store)
    }

    fn msg(address: &str, args: Vec<TypedValue>) -> Message {
        Message::new(address, args).unwrap()
    }

    #[test]
    fn test_greeter_picks_greeting_by_index() {
        let (dispatcher, store) = setup(Profile::Greeter, Tables::default());

        dispatcher.dispatch(&msg("/lang", vec![TypedValue::Int32(3)]));
        assert_eq!(store.get_text(GREETING).as_deref(), Some("Bonjour"));
        assert_eq!(store.get_int(GREETING_INDEX), Some(3));

        // Trailing name argument is ignored by the greeter; index 2 is "Guten Tag"
        dispatcher.dispatch(&msg(
            "/lang",
            vec![TypedValue::Int32(2), TypedValue::from("Bonjour")],
        ));
        assert_eq!(store.get_text(GREETING).as_deref(), Some("Guten Tag"));
        assert_eq!(store.get(FLAG), None);
    }

    #[test]
    fn test_greeter_out_of_range_leaves_state() {
        let (dispatcher, store) = setup(Profile::Greeter, Tables::default());
        dispatcher.dispatch(&msg("/lang", vec![TypedValue::Int32(4)]));

        let report = dispatcher.dispatch(&msg("/lang", vec![TypedValue::Int32(5)]));
        assert_eq!(report.failed, 1);
        let report = dispatcher.dispatch(&msg("/lang", vec![TypedValue::Int32(-1)]));
        assert_eq!(report.failed, 1);

        assert_eq!(store.get_text(GREETING).as_deref(), Some("Hola"));
    }

    #[test]
    fn test_greeter_with_flags() {
        let tables = Tables {
            flags: vec!["🏳".into(), "🇬🇧".into(), "🇩🇪".into(), "🇫🇷".into(), "🇪🇸".into()],
            ..Tables::default()
        };
        let (dispatcher, store) = setup(Profile::Greeter, tables);

        dispatcher.dispatch(&msg("/lang", vec![TypedValue::Int32(1)]));

        assert_eq!(store.get_text(GREETING).as_deref(), Some("Hello"));
        assert_eq!(store.get_text(FLAG).as_deref(), Some("🇬🇧"));
    }

    #[test]
    fn test_detecting_toggles_visibility() {
        let (dispatcher, store) = setup(Profile::Greeter, Tables::default());

        dispatcher.dispatch(&msg("/detecting", vec![TypedValue::Int32(0)]));
        assert_eq!(store.get_bool(DETECTED_VISIBLE), Some(false));

        dispatcher.dispatch(&msg("/detecting", vec![TypedValue::Int32(1)]));
        assert_eq!(store.get_bool(DETECTED_VISIBLE), Some(true));

        dispatcher.dispatch(&msg("/detecting", vec![TypedValue::Int32(-7)]));
        assert_eq!(store.get_bool(DETECTED_VISIBLE), Some(true));
    }

    #[test]
    fn test_detecting_with_wrong_type_is_ignored() {
        let (dispatcher, store) = setup(Profile::Display, Tables::default());
        let report = dispatcher.dispatch(&msg("/detecting", vec![TypedValue::Float32(1.0)]));
        assert_eq!(report.failed, 1);
        assert_eq!(store.get(DETECTED_VISIBLE), None);
    }

    #[test]
    fn test_display_shows_id_and_name() {
        let (dispatcher, store) = setup(Profile::Display, Tables::default());

        dispatcher.dispatch(&msg(
            "/lang",
            vec![TypedValue::Int32(2), TypedValue::from("Bonjour")],
        ));

        assert_eq!(store.get_int(LANG_ID), Some(2));
        assert_eq!(store.get_text(LANG_NAME).as_deref(), Some("Bonjour"));
    }

    #[test]
    fn test_display_needs_both_arguments() {
        let (dispatcher, store) = setup(Profile::Display, Tables::default());
        dispatcher.dispatch(&msg("/lang", vec![TypedValue::Int32(2)]));
        assert_eq!(store.get(LANG_ID), None);
        assert_eq!(store.get(LANG_NAME), None);
    }

    #[test]
    fn test_monitor_records_every_message() {
        let (dispatcher, store) = setup(Profile::Monitor, Tables::default());

        dispatcher.dispatch(&msg("/anything", vec![]));
        dispatcher.dispatch(&demo_message().unwrap());

        assert_eq!(
            store.get_text(MESSAGE).as_deref(),
            Some("/bar s:\"helloworld\" i:1234 f:567.89")
        );
        assert_eq!(store.get_int(MESSAGE_COUNT), Some(2));
    }

    #[test]
    fn test_unknown_address_is_ignored() {
        let (dispatcher, store) = setup(Profile::Greeter, Tables::default());
        let report = dispatcher.dispatch(&msg("/unknown", vec![TypedValue::Int32(1)]));
        assert_eq!(report.invoked, 0);
        assert!(store.keys().is_empty());
    }
}
