//! Teams and their shared feed.
//!
//! A team lists its members as `uid -> true`; only members can post or
//! comment. Likes live inside the post as another `uid -> true` map and are
//! toggled with a transaction over the whole post, so concurrent toggles by
//! different users never overwrite each other.

use futures::StreamExt;

use super::{decode_keyed, require, with_keys, Keyed, RepoError, RepoStream, SharedStore};
use crate::models::{Comment, Post, Team};
use crate::paths;
use crate::store::{StoreExt, TxAction};

#[derive(Debug, Clone)]
pub struct TeamRepository {
    store: SharedStore,
}

impl TeamRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create_team(&self, name: &str, owner: &str) -> Result<Team, RepoError> {
        require(!name.trim().is_empty(), "team name is required")?;
        let mut team = Team::new(name.trim(), owner);
        let id = self.store.push_as(&paths::teams()?, &team).await?;
        team.set_key(id);
        tracing::info!("Created team {} ({}) for {}", team.name, team.id, owner);
        Ok(team)
    }

    pub async fn get_team(&self, team_id: &str) -> Result<Option<Team>, RepoError> {
        let team: Option<Team> = self.store.get_as(&paths::team(team_id)?).await?;
        Ok(team.map(|mut team| {
            team.set_key(team_id.to_string());
            team
        }))
    }

    pub async fn join(&self, team_id: &str, uid: &str) -> Result<(), RepoError> {
        self.require_team(team_id).await?;
        self.store
            .set_as(&paths::team_member(team_id, uid)?, &true)
            .await?;
        Ok(())
    }

    /// Leaves a team. The owner cannot leave their own team.
    pub async fn leave(&self, team_id: &str, uid: &str) -> Result<(), RepoError> {
        let team = self.require_team(team_id).await?;
        if team.owner == uid {
            return Err(RepoError::Forbidden(format!(
                "{} owns team {} and cannot leave it",
                uid, team.name
            )));
        }
        self.store
            .remove(&paths::team_member(team_id, uid)?)
            .await?;
        Ok(())
    }

    /// Teams `uid` belongs to, sorted by name.
    pub async fn teams_for(&self, uid: &str) -> Result<Vec<Team>, RepoError> {
        let teams = self.store.children_as::<Team>(&paths::teams()?).await?;
        let mut teams: Vec<Team> = with_keys(teams)
            .into_iter()
            .filter(|t| t.is_member(uid))
            .collect();
        teams.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(teams)
    }

    /// Publishes a post to the team feed. Only members may post.
    pub async fn post(
        &self,
        team_id: &str,
        author_id: &str,
        author_name: &str,
        text: &str,
    ) -> Result<Post, RepoError> {
        require(!text.trim().is_empty(), "post text is required")?;
        self.require_member(team_id, author_id).await?;

        let mut post = Post::new(author_id, author_name, text.trim());
        let id = self.store.push_as(&paths::posts(team_id)?, &post).await?;
        post.set_key(id);
        Ok(post)
    }

    pub async fn get_post(&self, team_id: &str, post_id: &str) -> Result<Option<Post>, RepoError> {
        let post: Option<Post> = self.store.get_as(&paths::post(team_id, post_id)?).await?;
        Ok(post.map(|mut post| {
            post.set_key(post_id.to_string());
            post
        }))
    }

    /// The newest `limit` posts, newest first.
    pub async fn feed(&self, team_id: &str, limit: usize) -> Result<Vec<Post>, RepoError> {
        let posts = self.store.children_as::<Post>(&paths::posts(team_id)?).await?;
        Ok(newest_first(with_keys(posts), limit))
    }

    /// Live feed; a new list is emitted on every post, like or comment.
    pub fn watch_feed(
        &self,
        team_id: &str,
        limit: usize,
    ) -> Result<RepoStream<Vec<Post>>, RepoError> {
        let path = paths::posts(team_id)?;
        Ok(self
            .store
            .watch(&path)
            .map(move |snapshot| {
                snapshot
                    .map(|s| newest_first(decode_keyed(s.value), limit))
                    .map_err(RepoError::from)
            })
            .boxed())
    }

    pub async fn comment(
        &self,
        team_id: &str,
        post_id: &str,
        author_id: &str,
        author_name: &str,
        text: &str,
    ) -> Result<Comment, RepoError> {
        require(!text.trim().is_empty(), "comment text is required")?;
        self.require_member(team_id, author_id).await?;
        if self.get_post(team_id, post_id).await?.is_none() {
            return Err(RepoError::NotFound(format!("Post {}", post_id)));
        }

        let mut comment = Comment::new(author_id, author_name, text.trim());
        let id = self
            .store
            .push_as(&paths::post_comments(team_id, post_id)?, &comment)
            .await?;
        comment.set_key(id);
        Ok(comment)
    }

    /// Likes or unlikes a post for `uid`. Returns whether the post is now liked.
    pub async fn toggle_like(
        &self,
        team_id: &str,
        post_id: &str,
        uid: &str,
    ) -> Result<bool, RepoError> {
        let path = paths::post(team_id, post_id)?;
        let outcome = self
            .store
            .transaction(&path, &|current| {
                let Some(mut post) = current.and_then(|v| serde_json::from_value::<Post>(v).ok())
                else {
                    return TxAction::Abort;
                };
                if post.liked_by(uid) {
                    post.likes.remove(uid);
                } else {
                    post.likes.insert(uid.to_string(), true);
                }
                match serde_json::to_value(&post) {
                    Ok(value) => TxAction::Commit(Some(value)),
                    Err(_) => TxAction::Abort,
                }
            })
            .await?;

        let post: Option<Post> = match outcome.value {
            Some(value) if outcome.committed => Some(serde_json::from_value(value)?),
            _ => None,
        };
        match post {
            Some(post) => Ok(post.liked_by(uid)),
            None => Err(RepoError::NotFound(format!("Post {}", post_id))),
        }
    }

    /// Deletes a post. Only its author may delete it.
    pub async fn delete_post(
        &self,
        team_id: &str,
        post_id: &str,
        uid: &str,
    ) -> Result<(), RepoError> {
        let post = self
            .get_post(team_id, post_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Post {}", post_id)))?;
        if post.author_id != uid {
            return Err(RepoError::Forbidden(format!(
                "only the author can delete post {}",
                post_id
            )));
        }
        Ok(self.store.remove(&paths::post(team_id, post_id)?).await?)
    }

    async fn require_team(&self, team_id: &str) -> Result<Team, RepoError> {
        self.get_team(team_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Team {}", team_id)))
    }

    async fn require_member(&self, team_id: &str, uid: &str) -> Result<Team, RepoError> {
        let team = self.require_team(team_id).await?;
        if !team.is_member(uid) {
            return Err(RepoError::Forbidden(format!(
                "{} is not a member of team {}",
                uid, team.name
            )));
        }
        Ok(team)
    }
}

fn newest_first(mut posts: Vec<Post>, limit: usize) -> Vec<Post> {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    posts.truncate(limit);
    posts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn repo() -> TeamRepository {
        TeamRepository::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_create_join_leave() {
        let repo = repo();
        let team = repo.create_team("Runners", "ana").await.unwrap();
        assert!(team.is_member("ana"));
        assert!(!team.id.is_empty());

        repo.join(&team.id, "ben").await.unwrap();
        assert_eq!(repo.teams_for("ben").await.unwrap().len(), 1);
        assert_eq!(repo.teams_for("ben").await.unwrap()[0].id, team.id);

        repo.leave(&team.id, "ben").await.unwrap();
        assert!(repo.teams_for("ben").await.unwrap().is_empty());

        assert!(matches!(
            repo.leave(&team.id, "ana").await,
            Err(RepoError::Forbidden(_))
        ));
        assert!(matches!(
            repo.join("missing", "ben").await,
            Err(RepoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_feed_newest_first_members_only() {
        let repo = repo();
        let team = repo.create_team("Lifters", "ana").await.unwrap();
        let first = repo.post(&team.id, "ana", "Ana", "first").await.unwrap();
        let second = repo.post(&team.id, "ana", "Ana", "second").await.unwrap();

        let feed = repo.feed(&team.id, 10).await.unwrap();
        let ids: Vec<&str> = feed.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
        assert_eq!(repo.feed(&team.id, 1).await.unwrap().len(), 1);

        assert!(matches!(
            repo.post(&team.id, "eve", "Eve", "hi").await,
            Err(RepoError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_comment_and_toggle_like() {
        let repo = repo();
        let team = repo.create_team("Walkers", "ana").await.unwrap();
        repo.join(&team.id, "ben").await.unwrap();
        let post = repo.post(&team.id, "ana", "Ana", "10k steps").await.unwrap();

        let comment = repo
            .comment(&team.id, &post.id, "ben", "Ben", "nice")
            .await
            .unwrap();
        assert!(repo.toggle_like(&team.id, &post.id, "ben").await.unwrap());

        let stored = repo.get_post(&team.id, &post.id).await.unwrap().unwrap();
        assert_eq!(stored.like_count(), 1);
        assert_eq!(stored.sorted_comments()[0].id, comment.id);
        assert_eq!(stored.sorted_comments()[0].text, "nice");

        assert!(!repo.toggle_like(&team.id, &post.id, "ben").await.unwrap());
        let stored = repo.get_post(&team.id, &post.id).await.unwrap().unwrap();
        assert_eq!(stored.like_count(), 0);

        assert!(matches!(
            repo.toggle_like(&team.id, "missing", "ben").await,
            Err(RepoError::NotFound(_))
        ));
        assert!(matches!(
            repo.comment(&team.id, "missing", "ben", "Ben", "?").await,
            Err(RepoError::NotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_likes_by_two_users_both_persist() {
        let repo = repo();
        let team = repo.create_team("Swimmers", "ana").await.unwrap();
        repo.join(&team.id, "ben").await.unwrap();
        let post = repo.post(&team.id, "ana", "Ana", "pool day").await.unwrap();

        let a = {
            let (repo, team, post) = (repo.clone(), team.id.clone(), post.id.clone());
            tokio::spawn(async move { repo.toggle_like(&team, &post, "ana").await })
        };
        let b = {
            let (repo, team, post) = (repo.clone(), team.id.clone(), post.id.clone());
            tokio::spawn(async move { repo.toggle_like(&team, &post, "ben").await })
        };
        assert!(a.await.unwrap().unwrap());
        assert!(b.await.unwrap().unwrap());

        let stored = repo.get_post(&team.id, &post.id).await.unwrap().unwrap();
        assert!(stored.liked_by("ana"));
        assert!(stored.liked_by("ben"));
    }

    #[tokio::test]
    async fn test_delete_post_author_only() {
        let repo = repo();
        let team = repo.create_team("Yoga", "ana").await.unwrap();
        repo.join(&team.id, "ben").await.unwrap();
        let post = repo.post(&team.id, "ana", "Ana", "namaste").await.unwrap();

        assert!(matches!(
            repo.delete_post(&team.id, &post.id, "ben").await,
            Err(RepoError::Forbidden(_))
        ));
        repo.delete_post(&team.id, &post.id, "ana").await.unwrap();
        assert!(repo.feed(&team.id, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_watch_feed() {
        let repo = repo();
        let team = repo.create_team("Cyclists", "ana").await.unwrap();
        let mut stream = repo.watch_feed(&team.id, 5).unwrap();
        assert!(stream.next().await.unwrap().unwrap().is_empty());

        let post = repo.post(&team.id, "ana", "Ana", "ride").await.unwrap();
        let feed = stream.next().await.unwrap().unwrap();
        assert_eq!(feed[0].id, post.id);

        repo.toggle_like(&team.id, &post.id, "ana").await.unwrap();
        let feed = stream.next().await.unwrap().unwrap();
        assert_eq!(feed[0].like_count(), 1);
    }
}
