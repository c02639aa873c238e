//! Closed enumerations shared by tickets and employees.
//!
//! Every variant has one canonical upper-snake name used on the wire and in
//! storage. Parsing accepts only those names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TechAidError;

macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Canonical storage name.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = TechAidError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(TechAidError::validation(format!(
                        "unknown {}: {other}",
                        stringify!($name).to_lowercase()
                    ))),
                }
            }
        }
    };
}

closed_enum! {
    /// What kind of problem a ticket reports.
    Category {
        Network => "NETWORK",
        Transaction => "TRANSACTION",
        Software => "SOFTWARE",
        Hardware => "HARDWARE",
    }
}

closed_enum! {
    Department {
        Sales => "SALES",
        Marketing => "MARKETING",
        CustomerService => "CUSTOMER_SERVICE",
        Operations => "OPERATIONS",
        Treasury => "TREASURY",
        HumanResources => "HUMAN_RESOURCES",
    }
}

closed_enum! {
    Priority {
        Low => "LOW",
        Medium => "MEDIUM",
        High => "HIGH",
    }
}

closed_enum! {
    /// Ticket lifecycle state. Moves only forward:
    /// `NotActive -> Active -> Completed`.
    Status {
        NotActive => "NOT_ACTIVE",
        Active => "ACTIVE",
        Completed => "COMPLETED",
    }
}

closed_enum! {
    Role {
        Admin => "ADMIN",
        BankStaff => "BANK_STAFF",
        ItPersonnel => "IT_PERSONNEL",
    }
}

impl Status {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed)
    }
}
