pub mod chartfile;
