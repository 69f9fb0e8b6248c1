use crate::cli::Args;
use crate::generation::GenerationClient;
use crate::models::chat::{ Message, MessageKind, Role };
use crate::models::user::SessionUser;
use crate::storage::create_auth_repository;
use crate::store::auth::CredentialStore;
use crate::store::chat::ConversationStore;
use std::error::Error;

/// Owns the two stores and the generation client, and wires a user-triggered
/// submission through them: append the prompt, call the service, append the
/// reply. The front-end drives this and renders the results.
pub struct ChatApp {
    auth: CredentialStore,
    conversation: ConversationStore,
    generation: GenerationClient,
}

impl ChatApp {
    pub async fn new(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let repository = create_auth_repository(args)?;
        let auth = CredentialStore::open(repository).await?;
        let generation = GenerationClient::new(args)?;
        Ok(Self {
            auth,
            conversation: ConversationStore::new(),
            generation,
        })
    }

    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str
    ) -> Result<bool, Box<dyn Error + Send + Sync>> {
        self.auth.register(username, email, password).await
    }

    pub async fn login(
        &mut self,
        email: &str,
        password: &str
    ) -> Result<bool, Box<dyn Error + Send + Sync>> {
        self.auth.login(email, password).await
    }

    pub async fn logout(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.auth.logout().await
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    pub fn current_user(&self) -> Option<&SessionUser> {
        self.auth.current_user()
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    pub fn clear_conversation(&mut self) {
        self.conversation.clear();
    }

    pub fn generation(&self) -> &GenerationClient {
        &self.generation
    }

    /// Handles one chat submission. The user message is appended before the
    /// generation call, so a failed call still leaves the prompt in the log;
    /// the assistant message is appended only on success.
    pub async fn submit(
        &mut self,
        prompt: &str,
        image_mode: bool
    ) -> Result<&Message, Box<dyn Error + Send + Sync>> {
        if !self.auth.is_authenticated() {
            return Err("not authenticated: log in before chatting".into());
        }

        self.conversation.add_message(prompt.to_string(), MessageKind::Text, Role::User);

        if image_mode {
            let blob = self.generation.generate_image(prompt).await?;
            Ok(self.conversation.add_message(blob.reference(), MessageKind::Image, Role::Assistant))
        } else {
            let reply = self.generation.generate_text(prompt).await?;
            Ok(self.conversation.add_message(reply, MessageKind::Text, Role::Assistant))
        }
    }
}
