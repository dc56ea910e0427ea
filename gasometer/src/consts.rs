//! Gas schedule constants. One fixed schedule; there is no fork-selection
//! layer.

pub const G_ZERO: u64 = 0;
pub const G_BASE: u64 = 2;
pub const G_VERYLOW: u64 = 3;
pub const G_LOW: u64 = 5;
pub const G_MID: u64 = 8;
pub const G_HIGH: u64 = 10;
pub const G_EXTCODE: u64 = 700;
pub const G_BALANCE: u64 = 400;
pub const G_SLOAD: u64 = 50;
pub const G_JUMPDEST: u64 = 1;
pub const G_SSET: u64 = 20000;
pub const G_SRESET: u64 = 5000;
pub const R_SCLEAR: i64 = 15000;
pub const G_SUICIDE: u64 = 5000;
pub const G_SUICIDE_NEWACCOUNT: u64 = 25000;
pub const R_SUICIDE: i64 = 24000;
pub const G_CREATE: u64 = 32000;
pub const G_CODEDEPOSIT: u64 = 200;
pub const G_CALL: u64 = 700;
pub const G_CALLVALUE: u64 = 9000;
pub const G_CALLSTIPEND: u64 = 2300;
pub const G_NEWACCOUNT: u64 = 25000;
pub const G_EXP: u64 = 10;
pub const G_EXPBYTE: u64 = 10;
pub const G_MEMORY: u64 = 3;
pub const G_LOG: u64 = 375;
pub const G_LOGDATA: u64 = 8;
pub const G_LOGTOPIC: u64 = 375;
pub const G_SHA3: u64 = 30;
pub const G_SHA3WORD: u64 = 6;
pub const G_COPY: u64 = 3;
pub const G_BLOCKHASH: u64 = 20;
