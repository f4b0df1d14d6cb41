//! Auth commands - sign in, sign out, session status and keepalive.

use std::io::Write;

use anyhow::{Context as _, Result};
use clap::Args;
use console::{Style, Term};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use vitrine_session::{Credentials, Keepalive, SessionStatus, guard};

use super::{Context, print_done};

/// Arguments for the login command.
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account login (prompted when omitted)
    #[arg(long)]
    pub login: Option<String>,

    /// Account password (prompted when omitted)
    #[arg(long, env = "VITRINE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Page to land on after signing in
    #[arg(long, default_value = "/")]
    pub callback: String,
}

/// Arguments for the status command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Also report where a visit to this page would be redirected
    #[arg(long)]
    pub page: Option<String>,
}

pub async fn login(args: LoginArgs, ctx: &Context) -> Result<()> {
    let login = match args.login {
        Some(login) => login,
        None => prompt("login> ")?,
    };
    if login.is_empty() {
        anyhow::bail!("login must not be empty");
    }
    let password = match args.password {
        Some(password) => password,
        None => {
            let term = Term::stderr();
            term.write_str("password> ")?;
            term.read_secure_line().context("reading password")?
        }
    };

    let services = ctx.connect().await?;
    services
        .session
        .login(&Credentials::new(login, password), &args.callback)
        .await?;

    let name = services
        .session
        .user()
        .map(|u| u.display_name())
        .unwrap_or_else(|| "unknown".to_string());

    if ctx.json_output {
        println!(
            "{}",
            json!({
                "status": services.session.status(),
                "user": services.session.user(),
                "redirect": services.navigator.current(),
            })
        );
    } else {
        print_done(format!("Signed in as {}", name), ctx);
        if ctx.verbose
            && let Some(target) = services.navigator.current()
        {
            println!("  redirect: {}", target);
        }
    }
    Ok(())
}

pub async fn logout(ctx: &Context) -> Result<()> {
    let services = ctx.connect().await?;
    services.session.logout().await?;
    print_done("Signed out", ctx);
    Ok(())
}

pub async fn status(args: StatusArgs, ctx: &Context) -> Result<()> {
    let services = ctx.connect().await?;
    let view = services.session.view();
    let redirect = args
        .page
        .as_deref()
        .and_then(|page| guard(view.status, page, services.session.login_page()));

    if ctx.json_output {
        println!(
            "{}",
            json!({
                "status": view.status,
                "is_authenticated": view.is_authenticated,
                "user": view.user,
                "redirect": redirect,
            })
        );
        return Ok(());
    }

    let dim = Style::new().dim();
    match view.status {
        SessionStatus::Authenticated if view.is_authenticated => {
            let name = view
                .user
                .as_ref()
                .map(|u| u.display_name())
                .unwrap_or_else(|| "unknown".to_string());
            println!("{} as {}", Style::new().green().apply_to("authenticated"), name);
        }
        status => {
            println!("{}", Style::new().yellow().apply_to(status));
            println!("{}", dim.apply_to("Run 'vitrine login' to sign in."));
        }
    }
    if let Some(page) = args.page {
        match redirect {
            Some(target) => println!("  {} -> {}", page, target),
            None => println!("  {} {}", page, dim.apply_to("(allowed)")),
        }
    }
    Ok(())
}

/// Keep the session alive until interrupted.
///
/// Each line on stdin counts as a focus event and triggers an immediate
/// refresh when focus refresh is enabled.
pub async fn watch(ctx: &Context) -> Result<()> {
    let services = ctx.connect().await?;
    if !services.session.is_authenticated() {
        anyhow::bail!("not signed in; run 'vitrine login' first");
    }

    let keepalive = Keepalive::spawn(services.session.clone(), &ctx.config.session);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut updates = services.session.provider().subscribe();
    let mut stdin_open = true;

    if !ctx.json_output {
        println!("Watching session (Ctrl-C to stop, Enter to refresh now)");
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line(), if stdin_open => match line? {
                Some(_) => keepalive.focus(),
                None => stdin_open = false,
            },
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = updates.borrow_and_update().status;
                if ctx.json_output {
                    println!("{}", json!({ "status": status }));
                } else {
                    println!("{} session {}", chrono::Local::now().format("%H:%M:%S"), status);
                }
                if status == SessionStatus::Unauthenticated {
                    break;
                }
            }
        }
    }

    keepalive.stop();
    services.report_navigation();
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
