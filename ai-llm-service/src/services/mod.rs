pub mod gemini_service;
pub mod groq_service;
