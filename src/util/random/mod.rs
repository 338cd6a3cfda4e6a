pub mod csharp;
