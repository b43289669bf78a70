//! # draw_core
//!
//! Pure building blocks of the numbers draw: wager parsing, slot
//! normalization, budget-constrained winner selection and series filling.
//! No I/O; randomness is always passed in by the caller.

pub mod constants;
pub mod selector;
pub mod series;
pub mod slot;
pub mod wager;

pub use constants::*;
pub use selector::{quantity_capacity, select_winners, total_value, DrawEntry};
pub use series::{build_board, fill_series, SeriesBoard};
pub use slot::{normalize_slot, normalize_slots, parse_slot_list, time_of_day};
pub use wager::{parse_wager, parse_wager_any, Combination, Wager};
