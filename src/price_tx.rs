//! Builder for signed price-publish transactions.

use crate::{
    hash::Hash,
    pubkey::Pubkey,
    signature::Keypair,
    tx_encoder::TxEncoder,
    Slot,
};

/// On-chain program struct version tag carried in every instruction.
pub const PC_VERSION: u32 = 2;

/// SysvarC1ock11111111111111111111111111111111
pub const SYSVAR_CLOCK_ID: Pubkey = Pubkey::new_from_array([
    6, 167, 213, 23, 24, 199, 116, 201, 40, 86, 99, 152, 105, 29, 94, 182, 139, 94, 184, 163, 155,
    75, 109, 92, 115, 85, 91, 33, 0, 0, 0, 0,
]);

// cmd_upd_price parameter blob: version, command, status, reserved,
// price, confidence, publish slot
const CMD_UPD_PRICE_LEN: usize = 40;

/// Anything that can serialize itself into an outbound transaction
/// buffer.
pub trait TxBuild {
    fn build(&self, buf: &mut Vec<u8>);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum PriceStatus {
    Unknown = 0,
    Trading = 1,
    Halted = 2,
    Auction = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum PriceCommand {
    UpdPrice = 7,
    AggPrice = 11,
}

/// One price-publish transaction. Key material is borrowed for the span
/// of a `build` call; callers retain ownership.
pub struct PriceUpdate<'a> {
    pub publisher: &'a Keypair,
    pub price_account: &'a Pubkey,
    pub program: &'a Pubkey,
    pub blockhash: &'a Hash,
    pub price: i64,
    pub conf: u64,
    pub status: PriceStatus,
    pub pub_slot: Slot,
    pub command: PriceCommand,
}

impl TxBuild for PriceUpdate<'_> {
    fn build(&self, buf: &mut Vec<u8>) {
        let mut tx = TxEncoder::new(buf);

        // signatures section: one signature (publisher), filled in last
        tx.write_short_vec_len(1);
        let sig_pos = tx.reserve_signature();

        // message header
        let message_start = tx.position();
        tx.write_u8(1); // publisher is the only signing account
        tx.write_u8(0); // read-only signed accounts
        tx.write_u8(2); // sysvar and program id are read-only unsigned

        // accounts: publisher, price account, sysvar clock, program id
        tx.write_short_vec_len(4);
        tx.write_bytes(self.publisher.pubkey().as_ref());
        tx.write_bytes(self.price_account.as_ref());
        tx.write_bytes(SYSVAR_CLOCK_ID.as_ref());
        tx.write_bytes(self.program.as_ref());

        tx.write_bytes(self.blockhash.as_ref());

        // one instruction against account indices {0,1,2}
        tx.write_short_vec_len(1);
        tx.write_u8(3); // program id index
        tx.write_short_vec_len(3);
        tx.write_u8(0);
        tx.write_u8(1);
        tx.write_u8(2);

        // instruction parameter section
        tx.write_short_vec_len(CMD_UPD_PRICE_LEN);
        tx.write_u32(PC_VERSION);
        tx.write_i32(self.command as i32);
        tx.write_i32(self.status as i32);
        tx.write_i32(0);
        tx.write_i64(self.price);
        tx.write_u64(self.conf);
        tx.write_u64(self.pub_slot);

        tx.sign(sig_pos, message_start, self.publisher);
    }
}
