pub use super::neo_data::Entity as NeoData;
