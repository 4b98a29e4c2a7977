pub mod client;

pub use client::InMemoryClientRepository;
