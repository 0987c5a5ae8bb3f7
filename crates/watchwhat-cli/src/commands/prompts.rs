use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use dialoguer::{Confirm, Input, MultiSelect, Password};
use watchwhat_models::{is_valid_score, Genre};

/// Prompt for a string value with optional default
pub fn prompt_string(prompt: &str, default: Option<&str>) -> Result<String> {
    let mut input_builder = Input::<String>::new().with_prompt(prompt).allow_empty(true);

    if let Some(default_value) = default {
        input_builder = input_builder.default(default_value.to_string());
    }

    input_builder
        .interact_text()
        .map_err(|e| eyre!("Failed to read input: {}", e))
}

/// Prompt for a secret (masked input)
pub fn prompt_password(prompt: &str) -> Result<String> {
    Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| eyre!("Failed to read secret: {}", e))
}

pub fn prompt_yes_no(prompt: &str, default: bool) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(|e| eyre!("Failed to read confirmation: {}", e))
}

/// Prompt for a score between 0 and 10, asking again until one is valid
pub fn prompt_rating(prompt: &str, default: f32, output: &Output) -> Result<f32> {
    loop {
        let input = Input::<String>::new()
            .with_prompt(prompt)
            .default(format!("{:.1}", default))
            .interact_text()
            .map_err(|e| eyre!("Failed to read input: {}", e))?;

        match input.trim().parse::<f32>() {
            Ok(score) if is_valid_score(score) => return Ok(score),
            _ => output.error("Please enter a number between 0 and 10."),
        }
    }
}

/// Let the user tick genres; the ids in `selected` start out ticked
pub fn prompt_genres(prompt: &str, genres: &[Genre], selected: &[u32]) -> Result<Vec<u32>> {
    let names: Vec<&str> = genres.iter().map(|g| g.name.as_str()).collect();
    let defaults: Vec<bool> = genres.iter().map(|g| selected.contains(&g.id)).collect();

    let picked = MultiSelect::new()
        .with_prompt(prompt)
        .items(&names)
        .defaults(&defaults)
        .interact()
        .map_err(|e| eyre!("Failed to read selection: {}", e))?;

    Ok(picked.into_iter().map(|i| genres[i].id).collect())
}
