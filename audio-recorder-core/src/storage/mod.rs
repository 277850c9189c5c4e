pub mod recording_writer;
