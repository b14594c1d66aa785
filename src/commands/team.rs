use clap::{Args, Subcommand};
use futures::StreamExt;
use nutrilog_core::repo::{ProfileRepository, TeamRepository};
use nutrilog_core::Post;

use super::{print_json, CommandResult, Context, OutputFormat};

#[derive(Args)]
pub struct TeamCommand {
    #[command(subcommand)]
    pub command: TeamSubcommand,
}

#[derive(Subcommand)]
pub enum TeamSubcommand {
    /// Create a team you own
    Create { name: String },

    /// Join a team
    Join { team_id: String },

    /// Leave a team
    Leave { team_id: String },

    /// List the teams you belong to
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Post to a team's feed
    Post { team_id: String, text: String },

    /// Show a team's feed, newest first
    Feed {
        team_id: String,

        /// Number of posts to show
        #[arg(long, short, default_value = "20")]
        limit: usize,

        /// Keep running and print the feed again whenever it changes
        #[arg(long)]
        follow: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Comment on a post
    Comment {
        team_id: String,
        post_id: String,
        text: String,
    },

    /// Like a post, or take the like back
    Like { team_id: String, post_id: String },

    /// Delete one of your posts
    DeletePost { team_id: String, post_id: String },
}

impl TeamCommand {
    pub async fn run(&self, ctx: &Context) -> CommandResult {
        let teams = TeamRepository::new(ctx.store.clone());
        let uid = ctx.uid();

        match &self.command {
            TeamSubcommand::Create { name } => {
                let team = teams.create_team(name, uid).await?;
                println!("Created team '{}' ({})", team.name, team.id);
                Ok(())
            }

            TeamSubcommand::Join { team_id } => {
                teams.join(team_id, uid).await?;
                println!("Joined team {}", team_id);
                Ok(())
            }

            TeamSubcommand::Leave { team_id } => {
                teams.leave(team_id, uid).await?;
                println!("Left team {}", team_id);
                Ok(())
            }

            TeamSubcommand::List { format } => {
                let mine = teams.teams_for(uid).await?;
                match format {
                    OutputFormat::Json => print_json(&mine)?,
                    OutputFormat::Text => {
                        if mine.is_empty() {
                            println!("You are not in any team.");
                        }
                        for team in &mine {
                            let role = if team.owner == uid { " (owner)" } else { "" };
                            println!(
                                "{}  {}{} - {} member(s)",
                                team.id,
                                team.name,
                                role,
                                team.members.len()
                            );
                        }
                    }
                }
                Ok(())
            }

            TeamSubcommand::Post { team_id, text } => {
                let name = display_name(ctx).await?;
                let post = teams.post(team_id, uid, &name, text).await?;
                println!("Posted {}", post.id);
                Ok(())
            }

            TeamSubcommand::Feed {
                team_id,
                limit,
                follow,
                format,
            } => {
                if !*follow {
                    let posts = teams.feed(team_id, *limit).await?;
                    return print_feed(&posts, uid, format);
                }

                let mut updates = teams.watch_feed(team_id, *limit)?;
                loop {
                    tokio::select! {
                        update = updates.next() => match update {
                            Some(posts) => {
                                print_feed(&posts?, uid, format)?;
                                println!();
                            }
                            None => break,
                        },
                        _ = tokio::signal::ctrl_c() => break,
                    }
                }
                Ok(())
            }

            TeamSubcommand::Comment {
                team_id,
                post_id,
                text,
            } => {
                let name = display_name(ctx).await?;
                let comment = teams.comment(team_id, post_id, uid, &name, text).await?;
                println!("Commented {}", comment.id);
                Ok(())
            }

            TeamSubcommand::Like { team_id, post_id } => {
                if teams.toggle_like(team_id, post_id, uid).await? {
                    println!("Liked post {}", post_id);
                } else {
                    println!("Unliked post {}", post_id);
                }
                Ok(())
            }

            TeamSubcommand::DeletePost { team_id, post_id } => {
                teams.delete_post(team_id, post_id, uid).await?;
                println!("Deleted post {}", post_id);
                Ok(())
            }
        }
    }
}

/// Name shown on posts: the profile name, or the user id without a profile.
async fn display_name(ctx: &Context) -> Result<String, Box<dyn std::error::Error>> {
    let profile = ProfileRepository::new(ctx.store.clone())
        .get(ctx.uid())
        .await?;
    Ok(profile.map_or_else(|| ctx.uid().to_string(), |p| p.name))
}

fn print_feed(posts: &[Post], uid: &str, format: &OutputFormat) -> CommandResult {
    match format {
        OutputFormat::Json => print_json(&posts)?,
        OutputFormat::Text => {
            if posts.is_empty() {
                println!("No posts yet.");
            }
            for post in posts {
                let liked = if post.liked_by(uid) { " *" } else { "" };
                println!(
                    "[{}] {} ({}): {}",
                    post.created_at.format("%Y-%m-%d %H:%M"),
                    post.author_name,
                    post.id,
                    post.text
                );
                println!("    {} like(s){}", post.like_count(), liked);
                for comment in post.sorted_comments() {
                    println!("    > {}: {}", comment.author_name, comment.text);
                }
            }
        }
    }
    Ok(())
}
