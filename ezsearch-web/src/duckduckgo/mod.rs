//! DuckDuckGo's JavaScript-free results page (`html.duckduckgo.com/html/`).

mod client;

pub use client::DuckDuckGoFetcher;
