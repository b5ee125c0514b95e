//! Post command handlers.

use anyhow::{Context, Result};
use postpad_core::forms;
use postpad_core::remote::Post;

use super::{App, check_form};

fn print_post(post: &Post) {
    println!("{}  {}", post.id, post.title);
    for line in post.content.lines() {
        println!("    {line}");
    }
}

pub async fn list(app: &App) -> Result<()> {
    app.require_login()?;
    let manager = app.posts();
    manager.ensure_loaded().await.context("load posts")?;

    let posts = manager.posts();
    if posts.is_empty() {
        println!("No posts found.");
    } else {
        for post in posts.iter() {
            print_post(post);
        }
    }
    Ok(())
}

pub async fn create(app: &App, title: &str, content: &str) -> Result<()> {
    app.require_login()?;
    check_form(&forms::validate_post(title, content))?;

    let manager = app.posts();
    manager.begin_new()?;
    manager.set_draft(title, content)?;
    match manager.submit().await {
        Ok(post) => {
            println!("Created post {}", post.id);
            Ok(())
        }
        Err(err) => {
            let notice = manager.take_notice().unwrap_or_else(|| "Failed to create post.".into());
            Err(err).context(notice)
        }
    }
}

pub async fn edit(app: &App, id: &str, title: Option<&str>, content: Option<&str>) -> Result<()> {
    app.require_login()?;
    let manager = app.posts();
    manager.ensure_loaded().await.context("load posts")?;

    let post = manager
        .posts()
        .get(id)
        .cloned()
        .with_context(|| format!("Post '{id}' not found"))?;
    let title = title.unwrap_or(&post.title);
    let content = content.unwrap_or(&post.content);
    check_form(&forms::validate_post(title, content))?;

    manager.begin_edit(&post)?;
    manager.set_draft(title, content)?;
    match manager.submit().await {
        Ok(post) => {
            println!("Updated post {}", post.id);
            Ok(())
        }
        Err(err) => {
            let notice = manager.take_notice().unwrap_or_else(|| "Failed to update post.".into());
            Err(err).context(notice)
        }
    }
}

pub async fn delete(app: &App, id: &str) -> Result<()> {
    app.require_login()?;
    let manager = app.posts();
    manager.ensure_loaded().await.context("load posts")?;
    if !manager.posts().contains(id) {
        anyhow::bail!("Post '{id}' not found");
    }

    match manager.delete(id).await {
        Ok(()) => {
            println!("Deleted post {id}");
            Ok(())
        }
        Err(err) => {
            let notice = manager.take_notice().unwrap_or_else(|| "Failed to delete post.".into());
            Err(err).context(notice)
        }
    }
}
