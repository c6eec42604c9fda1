// src/lib.rs

pub mod config;
pub mod error;

pub mod entities {
    pub mod prelude;
    pub mod neo_data;
}

pub mod models {
    pub mod neo_feed;
    pub mod neo_record;
}

pub mod services {
    pub mod neo_feed;
    pub mod neo_schema;
    pub mod normalizer;
    pub mod persistence;
}

pub mod jobs {
    pub mod neo_backfill;
}

#[cfg(test)]
pub(crate) mod testing;
