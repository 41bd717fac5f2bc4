//! `porter` — thin command-line driver for the session core.
//!
//! Usage:
//!   porter login <email> <password>
//!   porter register <name> <email> <phone> <password>
//!   porter whoami
//!   porter users list
//!   porter logout
//!
//! The service location comes from `PORTER_API_URL`; the credential
//! survives between invocations in the platform data directory.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use porter_client::{AuthClient, AuthError, AuthResult, ClientConfig, SqliteTokenStore};

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let store = match SqliteTokenStore::default_location() {
        Ok(store) => Arc::new(store),
        Err(err) => {
            eprintln!("cannot open credential store: {err}");
            std::process::exit(1);
        }
    };

    let client = AuthClient::new(ClientConfig::from_env(), store);
    client.initialize().await;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(err) = run(&client, &args).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run(client: &AuthClient, args: &[String]) -> AuthResult<()> {
    let words: Vec<&str> = args.iter().map(String::as_str).collect();
    match words.as_slice() {
        ["login", email, password] => {
            client.login(email, password).await?;
            match client.resolve_profile().await? {
                Some(user) => println!("logged in as {}", user.email),
                None => println!("logged in"),
            }
            Ok(())
        }
        ["register", name, email, phone, password] => {
            client.register(name, email, phone, password).await?;
            println!("registered {email}");
            Ok(())
        }
        ["whoami"] => {
            match client.resolve_profile().await? {
                Some(user) => print_user(&user),
                None => println!("not logged in"),
            }
            Ok(())
        }
        ["users", "list"] => {
            // Resolve first so the role reflects the server's view.
            client.resolve_profile().await?;
            let admin = client
                .admin()
                .ok_or_else(|| AuthError::forbidden("user management requires the ADMIN role"))?;
            for user in admin.list().await? {
                print_user(&user);
            }
            Ok(())
        }
        ["logout"] => {
            client.logout().await;
            println!("logged out");
            Ok(())
        }
        _ => {
            eprintln!(
                "usage: porter <login <email> <password> | register <name> <email> <phone> <password> | whoami | users list | logout>"
            );
            Ok(())
        }
    }
}

fn print_user(user: &porter_client::User) {
    let role = user.role.as_ref().map(|r| r.as_str()).unwrap_or("-");
    let name = user.name.as_deref().unwrap_or("-");
    println!("{:<8} {:<24} {:<20} {}", user.id, user.email, name, role);
}
