pub mod handlers;
pub mod listing;
pub mod path_utils;

use percent_encoding::percent_decode_str;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::logging::LoggingExt;
