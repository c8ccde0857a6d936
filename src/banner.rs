// src/banner.rs

/// Prints the application startup banner to the console.
pub fn print_banner() {
    let banner = r#"
       _    _ _ _             _
   ___| | _(_) | | __ _  __ _| |_ ___
  / __| |/ / | | |/ _` |/ _` | __/ _ \
  \__ \   <| | | | (_| | (_| | ||  __/
  |___/_|\_\_|_|_|\__, |\__,_|\__\___|
                  |___/

    Coding Practice & Judge Server
"#;
    println!("{}", banner);
}
