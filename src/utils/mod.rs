// src/utils/mod.rs

pub mod html;
pub mod matcher;
pub mod time;
