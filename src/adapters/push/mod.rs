//! Push notification adapters.

mod fcm;

pub use fcm::{FcmConfig, FcmPushSender};
