use std::error::Error;

use steampad::config::{path::get_config_search_paths, SessionConfig};

pub fn handle_config(config: &SessionConfig) -> Result<(), Box<dyn Error>> {
    println!("# Search paths:");
    for path in get_config_search_paths() {
        println!("#   {}", path.display());
    }
    print!("{}", config.to_yaml()?);

    Ok(())
}
