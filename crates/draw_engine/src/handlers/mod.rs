pub mod claim;
pub mod draw;
pub mod ticket;

pub use claim::{handle_check_ticket, handle_submit_claim};
pub use draw::{handle_trigger_draw, payout_budget};
pub use ticket::handle_issue_ticket;
