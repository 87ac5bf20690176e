pub mod fake_transcoder;
