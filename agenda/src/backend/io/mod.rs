//! # IO Module
//!
//! Provides the interface layer between the user interface and the domain logic.
//!
//! Each screen of the salon app has a controller here. A controller owns the
//! screen's state (form fields, cursor, list snapshot, realtime listener),
//! turns user actions into domain operations, and formats results for the UI.
//! Failures never escape as errors: they become one-shot [`shared::Alert`]s
//! or are logged and rendered as an empty list.
//!
//! ## Key Responsibilities
//!
//! - **Screen State**: Holding what each screen displays between actions
//! - **Action Handling**: Mapping taps and text changes to service calls
//! - **Error Translation**: Converting domain errors into user alerts
//! - **Lifecycle**: Acquiring and releasing live refresh per screen visit

pub mod screens;

pub use screens::*;
