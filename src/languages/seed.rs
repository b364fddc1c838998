//! One-time seed of the language reference table.
//!
//! Runs at startup when the table is empty.

use sqlx::SqlitePool;

use super::db;

struct SeedLanguage {
    name: &'static str,
    code: &'static str,
    native_name: &'static str,
    flag: &'static str,
    popularity: i64,
}

const SEED: &[SeedLanguage] = &[
    SeedLanguage { name: "English", code: "en", native_name: "English", flag: "🇬🇧", popularity: 1000 },
    SeedLanguage { name: "Chinese (Simplified)", code: "zh", native_name: "中文", flag: "🇨🇳", popularity: 950 },
    SeedLanguage { name: "Spanish", code: "es", native_name: "Español", flag: "🇪🇸", popularity: 900 },
    SeedLanguage { name: "French", code: "fr", native_name: "Français", flag: "🇫🇷", popularity: 800 },
    SeedLanguage { name: "German", code: "de", native_name: "Deutsch", flag: "🇩🇪", popularity: 750 },
    SeedLanguage { name: "Japanese", code: "ja", native_name: "日本語", flag: "🇯🇵", popularity: 700 },
    SeedLanguage { name: "Korean", code: "ko", native_name: "한국어", flag: "🇰🇷", popularity: 650 },
    SeedLanguage { name: "Russian", code: "ru", native_name: "Русский", flag: "🇷🇺", popularity: 600 },
    SeedLanguage { name: "Italian", code: "it", native_name: "Italiano", flag: "🇮🇹", popularity: 550 },
    SeedLanguage { name: "Portuguese", code: "pt", native_name: "Português", flag: "🇵🇹", popularity: 500 },
    SeedLanguage { name: "Arabic", code: "ar", native_name: "العربية", flag: "🇸🇦", popularity: 450 },
    SeedLanguage { name: "Hindi", code: "hi", native_name: "हिन्दी", flag: "🇮🇳", popularity: 400 },
];

/// Insert the seed list when the table is empty. Idempotent.
pub async fn seed_languages_if_empty(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    if db::count_languages(pool).await? > 0 {
        return Ok(());
    }

    tracing::info!("seeding {} languages", SEED.len());
    for lang in SEED {
        if let Err(e) =
            db::create_language(pool, lang.code, lang.name, lang.native_name, lang.flag, lang.popularity)
                .await
        {
            tracing::warn!("failed to seed language {}: {e}", lang.code);
        }
    }

    Ok(())
}
