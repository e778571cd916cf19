use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares a `u64` identifier that cannot be confused with the others.
macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl Write for $name {
            fn write(&self, writer: &mut impl BufMut) {
                self.0.write(writer);
            }
        }

        impl Read for $name {
            type Cfg = ();

            fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
                Ok(Self(u64::read(reader)?))
            }
        }

        impl FixedSize for $name {
            const SIZE: usize = u64::SIZE;
        }
    };
}

identifier!(
    /// Balance container owned by exactly one holder.
    AccountId
);
identifier!(
    /// Currency or asset class.
    CoinId
);
identifier!(
    /// Logical owner of one or more accounts.
    HolderId
);
identifier!(
    /// Monotonic ledger entry id (first entry is 1).
    TransactionId
);
identifier!(
    /// Identity resolved by the external authentication layer.
    UserId
);
