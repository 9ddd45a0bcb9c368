mod cli;
mod local;
mod remote;
mod search;
