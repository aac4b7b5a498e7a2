//! # picture-sorter CLI
//!
//! Command-line interface for the picture sorter.
//!
//! ## Usage
//! ```bash
//! picture-sorter scan ~/Photos --sort date
//! picture-sorter session --target ~/Sorted
//! ```

mod cli;

use picture_sorter::Result;

fn main() -> Result<()> {
    picture_sorter::init_tracing();
    cli::run()
}
