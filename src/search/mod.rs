pub mod controller;
pub mod filter;
pub mod model;
pub mod source;

pub use controller::{Direction, DropdownState, SearchOptions, SymbolSearchController};
pub use model::{Market, Suggestion, Tab};
pub use source::{HttpSuggestionSource, SuggestionSource};
