mod interpreter;
mod stop;
