//! SeaORM entity models
//!
//! Database entities for AskArxiv

mod paper;

pub use paper::{
    ActiveModel as PaperActiveModel, Column as PaperColumn, Entity as PaperEntity, Model as Paper,
};
