mod basic_operations;
mod chunking;
mod cli;
mod concurrency;
mod persistence;
