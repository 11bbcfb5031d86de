//! Starter files seeded into every new project.

use crate::flat::{hydrate_by_path, FlatRecord};
use crate::tree::Forest;

const APP_JSX: &str = r#"export default function App() {
  return (
    <div style={{ minHeight: '100vh', display: 'grid', placeItems: 'center' }}>
      <div style={{ textAlign: 'center' }}>
        <h1 style={{ fontSize: '2.5rem', marginBottom: '0.75rem' }}>Hello</h1>
        <p>Edit src/App.jsx to get started.</p>
      </div>
    </div>
  );
}
"#;

const MAIN_JSX: &str = r#"import React from 'react';
import ReactDOM from 'react-dom/client';
import App from './App.jsx';
import './index.css';

ReactDOM.createRoot(document.getElementById('root')).render(
  <React.StrictMode>
    <App />
  </React.StrictMode>
);
"#;

const INDEX_CSS: &str = r#"body {
  margin: 0;
  font-family: system-ui, -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
  background-color: #020617;
  color: #e2e8f0;
}
"#;

const PACKAGE_JSON: &str = r#"{
  "name": "studiotree-sandbox",
  "version": "0.0.1",
  "private": true,
  "main": "src/main.jsx",
  "dependencies": {
    "react": "latest",
    "react-dom": "latest"
  }
}"#;

/// Flat records of the default React project, shallowest first
pub fn default_records() -> Vec<FlatRecord> {
    vec![
        FlatRecord::folder("src"),
        FlatRecord::file("package.json", PACKAGE_JSON),
        FlatRecord::file("src/App.jsx", APP_JSX),
        FlatRecord::file("src/main.jsx", MAIN_JSX),
        FlatRecord::file("src/index.css", INDEX_CSS),
    ]
}

/// The default project as a fresh in-memory tree
pub fn default_forest() -> Forest {
    hydrate_by_path(&default_records())
}
