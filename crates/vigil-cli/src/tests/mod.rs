//! Unit and behavioural coverage for the CLI runtime.

mod support;
