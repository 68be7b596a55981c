mod account;
mod favorite;
mod ledger;
mod money;
mod payment;

pub use account::*;
pub use favorite::*;
pub use ledger::*;
pub use money::*;
pub use payment::*;
