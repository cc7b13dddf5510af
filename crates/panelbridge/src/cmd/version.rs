use crate::exit::{CliResult, SUCCESS};

pub fn run() -> CliResult<i32> {
    println!("panelbridge {}", env!("CARGO_PKG_VERSION"));
    Ok(SUCCESS)
}
