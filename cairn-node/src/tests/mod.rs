mod node;
mod settings;
