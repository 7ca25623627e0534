//! UUID newtypes for institutes, students, batches, fees and reminders

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[doc = concat!("Displayed as `", $prefix, "-<uuid>` and serialized as the bare UUID")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Sortable by creation time, used for stored rows
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", Self::PREFIX, self.0)
            }
        }

        /// Accepts both the display form and a bare UUID
        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s
                    .strip_prefix(Self::PREFIX)
                    .and_then(|rest| rest.strip_prefix('-'))
                    .unwrap_or(s);
                Uuid::parse_str(raw).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

// Organisation identifiers
define_id!(InstituteId, "INS");
define_id!(UserId, "USR");

// Directory identifiers
define_id!(StudentId, "STU");
define_id!(BatchId, "BAT");

// Fee ledger identifiers
define_id!(FeePlanId, "FPLAN");
define_id!(StudentFeeId, "SFEE");
define_id!(PaymentId, "PAY");

// Reminder identifiers
define_id!(ReminderRuleId, "RULE");
define_id!(NotificationId, "NTF");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_fee_id_display() {
        let id = StudentFeeId::new();
        let display = id.to_string();
        assert!(display.starts_with("SFEE-"));
    }

    #[test]
    fn test_id_parsing() {
        let original = StudentId::new();
        let parsed: StudentId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);

        let bare: StudentId = original.as_uuid().to_string().parse().unwrap();
        assert_eq!(original, bare);
    }

    #[test]
    fn test_uuid_conversion() {
        let uuid = Uuid::new_v4();
        let batch_id = BatchId::from(uuid);
        let back: Uuid = batch_id.into();
        assert_eq!(uuid, back);
    }
}
