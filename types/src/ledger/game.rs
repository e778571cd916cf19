use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::sha256::Digest;
use serde::{Deserialize, Serialize};

use super::{read_string, string_encode_size, write_string, TransactionId, MAX_SECRET_LENGTH};

/// Side picked by the player in a coin flip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum CoinSide {
    Heads = 0,
    Tails = 1,
}

impl CoinSide {
    pub fn from_bit(bit: u8) -> Self {
        if bit & 1 == 0 {
            Self::Heads
        } else {
            Self::Tails
        }
    }
}

impl Write for CoinSide {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for CoinSide {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        match value {
            0 => Ok(Self::Heads),
            1 => Ok(Self::Tails),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl FixedSize for CoinSide {
    const SIZE: usize = 1;
}

/// Server-side commitment created at init time and consumed by exactly one play.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameInstance {
    pub game_id: String,
    pub server_secret: String,
    /// `H(game_id :: server_secret)`, disclosed to the player before play.
    pub game_hash: Digest,
    pub is_used: bool,
}

impl Write for GameInstance {
    fn write(&self, writer: &mut impl BufMut) {
        write_string(&self.game_id, writer);
        write_string(&self.server_secret, writer);
        self.game_hash.write(writer);
        self.is_used.write(writer);
    }
}

impl Read for GameInstance {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            game_id: read_string(reader, MAX_SECRET_LENGTH)?,
            server_secret: read_string(reader, MAX_SECRET_LENGTH)?,
            game_hash: Digest::read(reader)?,
            is_used: bool::read(reader)?,
        })
    }
}

impl EncodeSize for GameInstance {
    fn encode_size(&self) -> usize {
        string_encode_size(&self.game_id)
            + string_encode_size(&self.server_secret)
            + self.game_hash.encode_size()
            + self.is_used.encode_size()
    }
}

/// Revealed inputs and outcome of a played game, keyed by its settlement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDetail {
    pub game_id: String,
    pub server_secret: String,
    pub client_secret: String,
    pub user_win: bool,
    pub transaction: TransactionId,
}

impl GameDetail {
    /// Bytes hashed into the settlement's `inner_hash`.
    pub fn payload(server_secret: &str, client_secret: &str, user_win: bool) -> Vec<u8> {
        let mut payload = Vec::with_capacity(
            string_encode_size(server_secret) + string_encode_size(client_secret) + 1,
        );
        write_string(server_secret, &mut payload);
        write_string(client_secret, &mut payload);
        user_win.write(&mut payload);
        payload
    }
}

impl Write for GameDetail {
    fn write(&self, writer: &mut impl BufMut) {
        write_string(&self.game_id, writer);
        write_string(&self.server_secret, writer);
        write_string(&self.client_secret, writer);
        self.user_win.write(writer);
        self.transaction.write(writer);
    }
}

impl Read for GameDetail {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            game_id: read_string(reader, MAX_SECRET_LENGTH)?,
            server_secret: read_string(reader, MAX_SECRET_LENGTH)?,
            client_secret: read_string(reader, MAX_SECRET_LENGTH)?,
            user_win: bool::read(reader)?,
            transaction: TransactionId::read(reader)?,
        })
    }
}

impl EncodeSize for GameDetail {
    fn encode_size(&self) -> usize {
        string_encode_size(&self.game_id)
            + string_encode_size(&self.server_secret)
            + string_encode_size(&self.client_secret)
            + self.user_win.encode_size()
            + self.transaction.encode_size()
    }
}
