//! Static message table: category -> action key -> user-facing text

use super::types::ErrorCategory;

/// Action key recorded for notifications carrying a caller-supplied message
pub const CUSTOM_ACTION: &str = "custom";

/// Known action keys of a category, in table order
pub fn actions(category: ErrorCategory) -> &'static [&'static str] {
    match category {
        ErrorCategory::Auth => &["login_failed", "token_expired", "unauthorized", "network_error"],
        ErrorCategory::Task => &[
            "load_failed",
            "update_failed",
            "delete_failed",
            "create_failed",
            "not_found",
            "validation_title",
            "unauthorized_update",
            "unauthorized_delete",
        ],
        ErrorCategory::Network => &["connection_failed", "server_error", "timeout"],
        ErrorCategory::Validation => &[
            "required_field",
            "invalid_email",
            "password_too_short",
            "invalid_format",
        ],
        ErrorCategory::Permission => &["access_denied", "insufficient_rights"],
        ErrorCategory::NotFound => &["page_not_found", "resource_not_found"],
    }
}

/// Look up the predefined message for `action` within `category`
pub fn lookup(category: ErrorCategory, action: &str) -> Option<&'static str> {
    let message = match (category, action) {
        (ErrorCategory::Auth, "login_failed") => "Email ou mot de passe incorrect",
        (ErrorCategory::Auth, "token_expired") => {
            "Votre session a expiré, veuillez vous reconnecter"
        }
        (ErrorCategory::Auth, "unauthorized") => {
            "Vous devez être connecté pour accéder à cette page"
        }
        (ErrorCategory::Auth, "network_error") => {
            "Erreur de connexion au serveur d'authentification"
        }

        (ErrorCategory::Task, "load_failed") => "Impossible de charger les tâches",
        (ErrorCategory::Task, "update_failed") => "Erreur lors de la mise à jour de la tâche",
        (ErrorCategory::Task, "delete_failed") => "Impossible de supprimer la tâche",
        (ErrorCategory::Task, "create_failed") => "Erreur lors de la création de la tâche",
        (ErrorCategory::Task, "not_found") => "Tâche non trouvée",
        (ErrorCategory::Task, "validation_title") => "Le titre de la tâche ne peut pas être vide",
        (ErrorCategory::Task, "unauthorized_update") => {
            "Vous n'avez pas les droits pour modifier cette tâche"
        }
        (ErrorCategory::Task, "unauthorized_delete") => {
            "Vous n'avez pas les droits pour supprimer cette tâche"
        }

        (ErrorCategory::Network, "connection_failed") => "Erreur de connexion réseau",
        (ErrorCategory::Network, "server_error") => "Erreur serveur, veuillez réessayer plus tard",
        (ErrorCategory::Network, "timeout") => {
            "La requête a pris trop de temps, veuillez réessayer"
        }

        (ErrorCategory::Validation, "required_field") => "Ce champ est obligatoire",
        (ErrorCategory::Validation, "invalid_email") => "Format d'email invalide",
        (ErrorCategory::Validation, "password_too_short") => {
            "Le mot de passe doit contenir au moins 6 caractères"
        }
        (ErrorCategory::Validation, "invalid_format") => "Format de données invalide",

        (ErrorCategory::Permission, "access_denied") => "Accès refusé",
        (ErrorCategory::Permission, "insufficient_rights") => {
            "Droits insuffisants pour cette action"
        }

        (ErrorCategory::NotFound, "page_not_found") => "Page non trouvée",
        (ErrorCategory::NotFound, "resource_not_found") => "Ressource non trouvée",

        _ => return None,
    };
    Some(message)
}

/// Resolve the text of a notification: a non-empty custom message wins, then the
/// table, then a generic string naming category and action.
pub fn resolve(category: ErrorCategory, action: &str, custom_message: Option<&str>) -> String {
    if let Some(custom) = custom_message.filter(|m| !m.is_empty()) {
        return custom.to_string();
    }
    lookup(category, action)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Erreur {}: {}", category, action))
}
