use crate::app::ChatApp;
use crate::models::chat::MessageKind;
use log::error;
use std::error::Error;
use std::io::Write;
use tokio::io::{ AsyncBufReadExt, BufReader };

const HELP: &str = "Commands:\n  \
    /register <username> <email> <password>\n  \
    /login <email> <password>\n  \
    /logout\n  \
    /image <prompt>       generate an image instead of text\n  \
    /clear                reset the conversation\n  \
    /help\n  \
    /quit\n\
Anything else is sent as a chat prompt.";

/// Interactive line-oriented front-end. Every failure is printed and the loop
/// returns to the prompt; nothing here is fatal.
pub async fn run_loop(app: &mut ChatApp) -> Result<(), Box<dyn Error + Send + Sync>> {
    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_whitespace().collect::<Vec<_>>().as_slice() {
            ["/quit"] => break,
            ["/help"] => println!("{}", HELP),
            ["/register", username, email, password] => {
                match app.register(username, email, password).await {
                    Ok(true) => println!("Registration successful. Please log in to continue."),
                    Ok(false) => println!("Registration failed. That email is already in use."),
                    Err(e) => error!("Failed to save credentials: {}", e),
                }
            }
            ["/register", ..] => println!("Usage: /register <username> <email> <password>"),
            ["/login", email, password] => {
                match app.login(email, password).await {
                    Ok(true) => {
                        let username = app
                            .current_user()
                            .map(|u| u.username.clone())
                            .unwrap_or_default();
                        println!("Welcome back, {}!", username);
                    }
                    Ok(false) => println!("Invalid email or password."),
                    Err(e) => error!("Failed to save session: {}", e),
                }
            }
            ["/login", ..] => println!("Usage: /login <email> <password>"),
            ["/logout"] => {
                match app.logout().await {
                    Ok(()) => println!("Logged out."),
                    Err(e) => error!("Failed to save session: {}", e),
                }
            }
            ["/clear"] => {
                app.clear_conversation();
                println!("Conversation cleared.");
            }
            ["/image"] => println!("Usage: /image <prompt>"),
            ["/image", ..] => {
                let prompt = line["/image".len()..].trim();
                handle_submit(app, prompt, true).await;
            }
            [command, ..] if command.starts_with('/') => {
                println!("Unknown command. Type /help for the command list.");
            }
            _ => handle_submit(app, line, false).await,
        }
    }

    Ok(())
}

async fn handle_submit(app: &mut ChatApp, prompt: &str, image_mode: bool) {
    if !app.is_authenticated() {
        println!("Please log in before chatting: /login <email> <password>");
        return;
    }

    match app.submit(prompt, image_mode).await {
        Ok(message) =>
            match message.kind {
                MessageKind::Image => println!("assistant: [image] {}", message.content),
                MessageKind::Text => println!("assistant: {}", message.content),
            }
        Err(e) => {
            error!("Generation error: {}", e);
            println!("Failed to generate response. Please try again.");
        }
    }
}
