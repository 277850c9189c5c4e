pub mod recording;
mod worker;

#[cfg(test)]
pub(crate) mod mock;
