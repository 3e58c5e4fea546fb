mod property_fallback;
mod support;
