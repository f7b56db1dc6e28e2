pub mod decay;
pub mod mastery;
