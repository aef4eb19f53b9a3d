pub mod db;
pub mod delivery;
pub mod digest;
pub mod error;
pub mod event;
pub mod notification;
pub mod recipient;
pub mod reminder;
pub mod routes;
pub mod state;

#[cfg(test)]
mod test_support;
